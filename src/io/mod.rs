//! Input/output: CSV export of the merged series and its inverse parser.

pub mod export;
