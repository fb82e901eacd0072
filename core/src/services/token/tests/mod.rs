mod rs256_tests;
mod service_tests;
