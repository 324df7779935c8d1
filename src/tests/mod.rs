pub mod dict_tests;
pub mod quorum_tests;
