use alloy_primitives::{
    Address,
    U256,
};

pub mod typing_stats_types {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Score {
            address player;
            uint256 wpm;
            uint256 accuracy;
            uint256 timestamp;
            string category;
        }

        #[derive(Debug, PartialEq, Eq)]
        event NewScore(address player, uint256 wpm, uint256 accuracy, string category);

        function addScore(uint256 _wpm, uint256 _accuracy, string memory _category) public;

        function getHighScores() public view returns (Score[] memory);

        function getPlayerScores(address _player) public view returns (Score[] memory);
    }
}

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub fn add_score_call(
    wpm: u64,
    accuracy: u64,
    category: impl Into<String>,
) -> typing_stats_types::addScoreCall {
    typing_stats_types::addScoreCall {
        _wpm: U256::from(wpm),
        _accuracy: U256::from(accuracy),
        _category: category.into(),
    }
}

pub fn player_scores_call(player: Address) -> typing_stats_types::getPlayerScoresCall {
    typing_stats_types::getPlayerScoresCall { _player: player }
}
