//! Typed change events published by a store whenever a match or message row
//! is written.

use serde::Serialize;

use crate::matching::{Match, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
  Matches,
  Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
  Insert,
  Update,
}

/// The row carried by an event, after the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChangeRow {
  Match(Match),
  Message(Message),
}

/// `{table, op, row}` for one written row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
  pub table: Table,
  pub op:    Op,
  pub row:   ChangeRow,
}

impl ChangeEvent {
  pub fn match_inserted(m: Match) -> Self {
    Self { table: Table::Matches, op: Op::Insert, row: ChangeRow::Match(m) }
  }

  pub fn message_inserted(m: Message) -> Self {
    Self { table: Table::Messages, op: Op::Insert, row: ChangeRow::Message(m) }
  }

  pub fn message_updated(m: Message) -> Self {
    Self { table: Table::Messages, op: Op::Update, row: ChangeRow::Message(m) }
  }

  pub fn message(&self) -> Option<&Message> {
    match &self.row {
      ChangeRow::Message(m) => Some(m),
      ChangeRow::Match(_) => None,
    }
  }

  pub fn match_row(&self) -> Option<&Match> {
    match &self.row {
      ChangeRow::Match(m) => Some(m),
      ChangeRow::Message(_) => None,
    }
  }
}
