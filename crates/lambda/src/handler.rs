use lambda_runtime::LambdaEvent;
use relay_core::{DispatchResponse, Dispatcher};
use tracing::instrument;

/// Handle one SNS invocation.
///
/// Returns `{"statusCode": 200, "body": "Task started"}` once the backend
/// accepted the task. Every failure is returned as an error so the runtime
/// reports the invocation as failed.
#[instrument(skip_all, fields(request_id = %event.context.request_id))]
pub async fn handle(
    dispatcher: &Dispatcher,
    event: LambdaEvent<serde_json::Value>,
) -> Result<DispatchResponse, lambda_runtime::Error> {
    let (payload, _context) = event.into_parts();
    dispatcher.dispatch(payload).await?;
    Ok(DispatchResponse::task_started())
}
