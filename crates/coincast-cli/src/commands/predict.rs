use coincast_core::{PredictionRequest, PredictionService, TargetSpec, UtcDateTime};

use crate::cli::PredictArgs;

use super::{CommandOutcome, CommandResult};

pub async fn run(args: &PredictArgs, service: &PredictionService) -> CommandOutcome {
    let target = match TargetSpec::from_parts(args.date.as_deref(), args.days) {
        Ok(target) => target,
        Err(error) => return Ok(Err(error)),
    };
    let request = PredictionRequest::new(args.symbol.clone(), target);

    match service.predict(UtcDateTime::now().date(), &request).await {
        Ok(result) => Ok(Ok(CommandResult::ok(serde_json::to_value(&result)?))),
        Err(error) => Ok(Err(error)),
    }
}
