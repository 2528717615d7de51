
// Utilities: export of derived series next to the rendered charts.

pub mod export;
