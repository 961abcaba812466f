pub mod tamper_tests;
