pub mod double_well;
pub mod ladder;
