use coincast_core::PredictionService;

use crate::cli::SymbolArgs;

use super::{CommandOutcome, CommandResult};

pub async fn run(args: &SymbolArgs, service: &PredictionService) -> CommandOutcome {
    match service.coin_stats(&args.symbol).await {
        Ok(stats) => Ok(Ok(CommandResult::ok(serde_json::to_value(&stats)?))),
        Err(error) => Ok(Err(error)),
    }
}
