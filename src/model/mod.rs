pub mod change;
pub mod dates;
pub mod player;
pub mod ranking;

pub use change::{ChangeRecord, REJECT_MARK};
pub use dates::{format_date, parse_date, DATE_FORMAT};
pub use player::{parse_player_id, Column, PlayerRecord, PlayerTable};
pub use ranking::{RankingObservation, RankingRow};
