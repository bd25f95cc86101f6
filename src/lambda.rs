use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{ErrorResponse, InvocationResponse, PhashRequest};
use crate::services::invocation::PhashHandler;

/// Turn a raw event into a response record. Payloads that are not a request
/// object are reported in the `error` field like any other failure.
pub async fn function_handler(handler: &PhashHandler, payload: Value) -> InvocationResponse {
    match serde_json::from_value::<PhashRequest>(payload) {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            warn!("Malformed event: {}", e);
            InvocationResponse::Error(ErrorResponse {
                error: format!("Invalid request: {}", e),
            })
        }
    }
}

/// Serve invocations from the Lambda runtime API until the environment
/// shuts the instance down
pub async fn run_lambda(handler: Arc<PhashHandler>) -> Result<(), Error> {
    info!("λ Waiting for invocations...");
    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = handler.clone();
        async move {
            info!(request_id = %event.context.request_id, "λ Invocation received");
            Ok::<_, Error>(function_handler(&handler, event.payload).await)
        }
    }))
    .await
}
