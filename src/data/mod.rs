//! Data structures for cross-omics analysis.

mod abundance;
mod count_matrix;
mod groups;
pub(crate) mod io;
mod metadata;
mod result;
mod table;

pub use abundance::{AbundanceRecord, AbundanceTable, ABUNDANCE_COLUMN, DEFAULT_RANK, SAMPLE_COLUMN};
pub use count_matrix::CountMatrix;
pub use groups::{GroupAssignment, ResolvedGroups};
pub use metadata::{Metadata, Variable, VariableType};
pub use result::{DeResult, DeResultSet, ResultSummary};
pub use table::{CorrelationMatrix, SampleTable};
