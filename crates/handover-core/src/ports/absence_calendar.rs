//! AbsenceCalendar port - 出欠カレンダー（読み取り専用）

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{AbsenceRecord, HandoverError};

/// AbsenceCalendar は指定日の出欠エントリを返す
///
/// 同じワーカーが複数回現れることがあります（重複排除は呼び出し側）。
#[async_trait]
pub trait AbsenceCalendar: Send + Sync {
    async fn absences_on(&self, date: NaiveDate) -> Result<Vec<AbsenceRecord>, HandoverError>;
}
