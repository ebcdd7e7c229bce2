
// This file organizes the integration tests into a cohesive test suite.
// Each module tests a specific aspect of the application:
// - smoke_tests: Basic configuration and storage checks
// - google_calendar_mock: Fetch, cache and create against a fake calendar service
