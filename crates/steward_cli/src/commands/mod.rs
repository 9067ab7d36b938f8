pub(crate) mod apply;
pub(crate) mod meta;
