use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// One of the three colour planes a source image is split into.
///
/// The variant names the destination key prefix and selects the derivation
/// applied to the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelVariant {
    Red,
    Green,
    Blue,
}

impl ChannelVariant {
    /// Every channel, in the order artifacts are derived and reported.
    pub const ALL: [ChannelVariant; 3] = [
        ChannelVariant::Red,
        ChannelVariant::Green,
        ChannelVariant::Blue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelVariant::Red => "red",
            ChannelVariant::Green => "green",
            ChannelVariant::Blue => "blue",
        }
    }

    /// Offset of this channel inside an interleaved RGB(A) pixel.
    pub fn sample_index(&self) -> usize {
        match self {
            ChannelVariant::Red => 0,
            ChannelVariant::Green => 1,
            ChannelVariant::Blue => 2,
        }
    }

    /// Destination key for this channel: `{channel}/{object_key}`.
    ///
    /// Depends only on the channel and the source key, so reprocessing a
    /// redelivered record overwrites the same objects.
    pub fn destination_key(&self, object_key: &str) -> String {
        format!("{}/{}", self.as_str(), object_key)
    }
}

impl Display for ChannelVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(ChannelVariant::Red),
            "green" => Ok(ChannelVariant::Green),
            "blue" => Ok(ChannelVariant::Blue),
            _ => Err(anyhow::anyhow!("Invalid channel: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_keys_are_namespaced_by_channel() {
        let keys: Vec<String> = ChannelVariant::ALL
            .iter()
            .map(|c| c.destination_key("cat.png"))
            .collect();
        assert_eq!(keys, vec!["red/cat.png", "green/cat.png", "blue/cat.png"]);
    }

    #[test]
    fn nested_keys_keep_their_path() {
        assert_eq!(
            ChannelVariant::Blue.destination_key("users/42/avatar.jpg"),
            "blue/users/42/avatar.jpg"
        );
    }

    #[test]
    fn sample_indices_follow_rgb_order() {
        let indices: Vec<usize> = ChannelVariant::ALL.iter().map(|c| c.sample_index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn parses_from_display() {
        for channel in ChannelVariant::ALL {
            assert_eq!(channel.to_string().parse::<ChannelVariant>().unwrap(), channel);
        }
        assert!("alpha".parse::<ChannelVariant>().is_err());
    }
}
