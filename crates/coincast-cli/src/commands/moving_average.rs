use coincast_core::PredictionService;

use crate::cli::MovingAverageArgs;

use super::{CommandOutcome, CommandResult};

pub async fn run(args: &MovingAverageArgs, service: &PredictionService) -> CommandOutcome {
    match service.moving_average(&args.symbol, args.window).await {
        Ok(average) => Ok(Ok(CommandResult::ok(serde_json::to_value(&average)?))),
        Err(error) => Ok(Err(error)),
    }
}
