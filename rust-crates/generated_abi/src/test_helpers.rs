use crate::typing_stats_types::{
    NewScore,
    Score,
    getHighScoresCall,
    getPlayerScoresCall,
};
use alloy_primitives::{
    Address,
    B256,
    U256,
};
use alloy_sol_types::{
    SolCall,
    SolEvent,
};
use std::str::FromStr;

pub fn player(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Builds a raw score tuple the way the contract stores it, taking the numeric fields as
/// decimal strings.
pub fn raw_score(
    player: Address,
    wpm: &str,
    accuracy: &str,
    timestamp: &str,
    category: &str,
) -> Score {
    Score {
        player,
        wpm: U256::from_str(wpm).expect("wpm must be a decimal integer"),
        accuracy: U256::from_str(accuracy).expect("accuracy must be a decimal integer"),
        timestamp: U256::from_str(timestamp)
            .expect("timestamp must be a decimal integer"),
        category: category.to_string(),
    }
}

pub fn encode_high_scores(scores: &[Score]) -> Vec<u8> {
    getHighScoresCall::abi_encode_returns(&(scores.to_vec(),))
}

pub fn encode_player_scores(scores: &[Score]) -> Vec<u8> {
    getPlayerScoresCall::abi_encode_returns(&(scores.to_vec(),))
}

/// Topics and data of the `NewScore` log the contract emits for a submission.
pub fn new_score_log(event: &NewScore) -> (Vec<B256>, Vec<u8>) {
    (vec![NewScore::SIGNATURE_HASH], event.encode_data())
}
