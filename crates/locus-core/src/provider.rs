#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationProvider {
    Fixed,
    Replay,
    Ip,
}

impl LocationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationProvider::Fixed => "fixed",
            LocationProvider::Replay => "replay",
            LocationProvider::Ip => "ip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Some(LocationProvider::Fixed),
            "replay" => Some(LocationProvider::Replay),
            "ip" => Some(LocationProvider::Ip),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LocationProvider::Fixed => "Fixed point",
            LocationProvider::Replay => "Replay file",
            LocationProvider::Ip => "IP geolocation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_round_trip() {
        for provider in [LocationProvider::Fixed, LocationProvider::Replay, LocationProvider::Ip] {
            assert_eq!(LocationProvider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(LocationProvider::from_str("IP"), Some(LocationProvider::Ip));
        assert_eq!(LocationProvider::from_str("gps"), None);
    }
}
