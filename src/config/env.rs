use super::ServerConfig;
use super::{merge, validation};

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset variables fall back to built-in defaults.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or if the
    /// resulting configuration fails validation.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let _ = dotenvy::dotenv();

        let config = merge::merge_config(None)?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn cleanup_env_vars() {
        unsafe {
            for key in [
                "PORT",
                "TTS_PROVIDER",
                "AZURE_SPEECH_SUBSCRIPTION_KEY",
                "TTS_SAMPLE_RATE",
                "TTS_CACHE_BACKEND",
            ] {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_with_azure_credentials() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_PROVIDER", "azure");
            env::set_var("AZURE_SPEECH_SUBSCRIPTION_KEY", "secret");
            env::set_var("PORT", "3100");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.tts_provider, "azure");
        assert_eq!(config.port, 3100);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_validates() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_SAMPLE_RATE", "12345");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("TTS_SAMPLE_RATE"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_provider() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TTS_PROVIDER", "polly");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("polly"));

        cleanup_env_vars();
    }
}
