use coincast_core::PredictionService;

use crate::cli::HistoryArgs;

use super::{CommandOutcome, CommandResult};

pub async fn run(args: &HistoryArgs, service: &PredictionService) -> CommandOutcome {
    match service.history(&args.symbol, args.days).await {
        Ok(history) => Ok(Ok(CommandResult::ok(serde_json::to_value(&history)?))),
        Err(error) => Ok(Err(error)),
    }
}
