pub mod candidates;
pub mod cascade;
pub mod handlers;
pub mod lifecycle;
pub mod proposer;
pub mod similarity;

#[cfg(test)]
pub(crate) mod test_support;
