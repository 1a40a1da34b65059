/// UI layer: the filter side panel / toolbar and the chart column.

pub mod charts;
pub mod panels;
