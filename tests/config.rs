use assert_matches::assert_matches;

use ares_bootstrap::config::{
    DEFAULT_MONGO_HOST, MONGO_HOST_ENV, REPO_ENV, Settings, TOKEN_ENV, resolve_token,
};
use ares_bootstrap::error::AresError;

// Environment mutation is process-global, so the whole resolution story lives
// in one test body instead of parallel test functions.
#[test]
fn settings_resolution_follows_flag_env_default_precedence() {
    unsafe {
        std::env::remove_var(TOKEN_ENV);
        std::env::remove_var(REPO_ENV);
        std::env::remove_var(MONGO_HOST_ENV);
    }

    // no token: nothing else is consulted, the run is refused up front
    assert_matches!(resolve_token(), Err(AresError::MissingToken(TOKEN_ENV)));
    assert_matches!(
        Settings::resolve(Some("/tmp/ares"), None, None),
        Err(AresError::MissingToken(TOKEN_ENV))
    );

    unsafe {
        std::env::set_var(TOKEN_ENV, "hf_test");
        std::env::set_var(REPO_ENV, "someone/else");
    }

    let settings = Settings::resolve(Some("/tmp/ares"), None, None).unwrap();
    assert_eq!(settings.token, "hf_test");
    assert_eq!(settings.repo, "someone/else");
    assert_eq!(settings.mongo_host, DEFAULT_MONGO_HOST);
    assert_eq!(settings.out_dir.as_str(), "/tmp/ares");

    // explicit flags win over the environment
    let settings =
        Settings::resolve(Some("/tmp/ares"), Some("cli/repo"), Some("db:27017")).unwrap();
    assert_eq!(settings.repo, "cli/repo");
    assert_eq!(settings.mongo_host, "db:27017");

    // a blank token counts as unset
    unsafe {
        std::env::set_var(TOKEN_ENV, "  ");
    }
    assert_matches!(resolve_token(), Err(AresError::MissingToken(TOKEN_ENV)));

    unsafe {
        std::env::remove_var(TOKEN_ENV);
        std::env::remove_var(REPO_ENV);
    }
}
