use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP settings
    pub listen_addr: String,
    pub trust_cf_connecting_ip: bool,
    pub debug: bool,

    // Database settings
    pub data_dir: String,
    pub mmdb_path: Option<String>,
    pub asn_mmdb_path: Option<String>,
    pub qqwry_path: Option<String>,
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8889".to_string(),
            trust_cf_connecting_ip: false,
            debug: false,
            data_dir: ".".to_string(),
            mmdb_path: None,
            asn_mmdb_path: None,
            qqwry_path: None,
            language: "en".to_string(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub fn load_config() -> anyhow::Result<Config> {
    let listen_addr = std::env::var("IPLOOKUP_LISTEN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8889".to_string());

    let trust_cf_connecting_ip = env_flag("IPLOOKUP_TRUST_CF_CONNECTING_IP");

    let debug = std::env::var("DEBUG").is_ok();

    // Database settings
    let data_dir = std::env::var("IPLOOKUP_DATA_DIR").unwrap_or_else(|_| ".".to_string());

    let mmdb_path = std::env::var("IPLOOKUP_MMDB_PATH").ok();
    let asn_mmdb_path = std::env::var("IPLOOKUP_ASN_MMDB_PATH").ok();
    let qqwry_path = std::env::var("IPLOOKUP_QQWRY_PATH").ok();

    let language = std::env::var("IPLOOKUP_LANGUAGE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "en".to_string());

    Ok(Config {
        listen_addr,
        trust_cf_connecting_ip,
        debug,
        data_dir,
        mmdb_path,
        asn_mmdb_path,
        qqwry_path,
        language,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // env vars are process-wide; keep these tests from interleaving
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8889");
        assert_eq!(cfg.data_dir, ".");
        assert_eq!(cfg.language, "en");
        assert!(!cfg.trust_cf_connecting_ip);
        assert!(cfg.mmdb_path.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("IPLOOKUP_LISTEN_ADDR");
        std::env::remove_var("IPLOOKUP_DATA_DIR");
        std::env::remove_var("IPLOOKUP_LANGUAGE");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8889");
        assert_eq!(cfg.data_dir, ".");
        assert_eq!(cfg.language, "en");
    }

    #[test]
    fn test_config_clone() {
        let cfg = Config::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.listen_addr, cloned.listen_addr);
        assert_eq!(cfg.language, cloned.language);
    }

    #[test]
    fn test_config_debug() {
        let cfg = Config::default();
        let debug_str = format!("{:?}", cfg);
        assert!(debug_str.contains("listen_addr"));
        assert!(debug_str.contains("0.0.0.0:8889"));
    }

    #[test]
    fn test_load_config_with_custom_listen_addr() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("IPLOOKUP_LISTEN_ADDR", "127.0.0.1:9000");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        std::env::remove_var("IPLOOKUP_LISTEN_ADDR");
    }

    #[test]
    fn test_load_config_with_database_paths() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("IPLOOKUP_DATA_DIR", "/var/lib/ip-lookup");
        std::env::set_var("IPLOOKUP_MMDB_PATH", "/data/GeoLite2-City.mmdb");
        std::env::set_var("IPLOOKUP_ASN_MMDB_PATH", "/data/GeoLite2-ASN.mmdb");
        std::env::set_var("IPLOOKUP_QQWRY_PATH", "/data/qqwry.dat");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.data_dir, "/var/lib/ip-lookup");
        assert_eq!(cfg.mmdb_path, Some("/data/GeoLite2-City.mmdb".to_string()));
        assert_eq!(cfg.asn_mmdb_path, Some("/data/GeoLite2-ASN.mmdb".to_string()));
        assert_eq!(cfg.qqwry_path, Some("/data/qqwry.dat".to_string()));
        std::env::remove_var("IPLOOKUP_DATA_DIR");
        std::env::remove_var("IPLOOKUP_MMDB_PATH");
        std::env::remove_var("IPLOOKUP_ASN_MMDB_PATH");
        std::env::remove_var("IPLOOKUP_QQWRY_PATH");
    }

    #[test]
    fn test_load_config_with_language() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("IPLOOKUP_LANGUAGE", "zh-CN");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.language, "zh-CN");

        std::env::set_var("IPLOOKUP_LANGUAGE", "  ");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.language, "en");
        std::env::remove_var("IPLOOKUP_LANGUAGE");
    }

    #[test]
    fn test_load_config_with_trust_cf_true() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("IPLOOKUP_TRUST_CF_CONNECTING_IP", "TRUE");
        let cfg = load_config().unwrap();
        assert!(cfg.trust_cf_connecting_ip);

        std::env::set_var("IPLOOKUP_TRUST_CF_CONNECTING_IP", "1");
        let cfg = load_config().unwrap();
        assert!(cfg.trust_cf_connecting_ip);

        std::env::set_var("IPLOOKUP_TRUST_CF_CONNECTING_IP", "no");
        let cfg = load_config().unwrap();
        assert!(!cfg.trust_cf_connecting_ip);
        std::env::remove_var("IPLOOKUP_TRUST_CF_CONNECTING_IP");
    }

    #[test]
    fn test_load_config_with_debug() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("DEBUG", "1");
        let cfg = load_config().unwrap();
        assert!(cfg.debug);
        std::env::remove_var("DEBUG");
    }
}
