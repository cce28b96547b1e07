use crate::{
    common::{self, condition::Filter, cursor::Cursor, selection::SelectionMap},
    error::{Error, Result},
    read,
};

/// Parameters of a scan over a whole table or index.
///
/// A scan reads every item and is the most expensive access path; `filter`
/// only trims what is returned, not what is read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanParams {
    /// Optional post-filter.
    pub filter: Option<Filter>,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// Cursor returned by the previous page.
    pub cursor: Option<Cursor>,
    /// Secondary index to scan instead of the base table.
    pub index_name: Option<String>,
    /// Which attributes to return.
    pub selection: Option<SelectionMap>,
    /// Whether to use a consistent read.
    pub consistent_read: Option<bool>,
    /// The segment number for parallel scans (0-indexed).
    pub segment: Option<i32>,
    /// The total number of segments for parallel scans.
    pub total_segments: Option<i32>,
}

/// Compiled scan request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanInput {
    /// Shared multiple-read settings.
    pub multiple_read_input: read::common::MultipleReadInput,
    /// Segment of a parallel scan.
    pub segment: Option<i32>,
    /// Segment count of a parallel scan.
    pub total_segments: Option<i32>,
}

/// Scan operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// What to read.
    pub params: ScanParams,
    /// The name of the table to read from.
    pub table_name: String,
}

impl TryFrom<Scan> for ScanInput {
    type Error = Error;

    fn try_from(scan: Scan) -> Result<Self> {
        let params = scan.params;
        let multiple_read_args = read::common::MultipleReadArgs {
            filter: params.filter,
            consistent_read: params.consistent_read,
            cursor: params.cursor,
            index_name: params.index_name,
            limit: params.limit,
            selection: params.selection,
            table_name: scan.table_name,
        };
        let multiple_read_input = multiple_read_args.compile(&mut common::Placeholders::new())?;
        Ok(Self {
            multiple_read_input,
            segment: params.segment,
            total_segments: params.total_segments,
        })
    }
}
