use url::form_urlencoded;

/// Chain explorer filters. Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainFilter {
    pub block_uuid: Option<String>,
    pub miner_key: Option<String>,
    pub block_index: Option<String>,
}

impl ChainFilter {
    pub fn from_inputs(block_uuid: &str, miner_key: &str, block_index: &str) -> Self {
        let present = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        Self {
            block_uuid: present(block_uuid),
            miner_key: present(miner_key),
            block_index: present(block_index),
        }
    }

    /// `?key=value&...` over the set filters, or `""` when none are set.
    pub fn build_query(&self) -> String {
        let pairs = [
            ("block_uuid", &self.block_uuid),
            ("miner_key", &self.miner_key),
            ("block_index", &self.block_index),
        ];
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in pairs {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                serializer.append_pair(key, value);
                any = true;
            }
        }
        if any {
            format!("?{}", serializer.finish())
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_builds_empty_query() {
        assert_eq!(ChainFilter::default().build_query(), "");
        assert_eq!(ChainFilter::from_inputs("", "  ", "").build_query(), "");
    }

    #[test]
    fn empty_values_are_omitted() {
        let filter = ChainFilter {
            block_uuid: Some("x".into()),
            miner_key: Some("".into()),
            block_index: Some("3".into()),
        };
        assert_eq!(filter.build_query(), "?block_uuid=x&block_index=3");
    }

    #[test]
    fn keys_keep_wire_order() {
        let filter = ChainFilter::from_inputs("u", "k", "7");
        assert_eq!(filter.build_query(), "?block_uuid=u&miner_key=k&block_index=7");
        let filter = ChainFilter::from_inputs("", "k", "");
        assert_eq!(filter.build_query(), "?miner_key=k");
    }

    #[test]
    fn values_are_encoded() {
        let filter = ChainFilter::from_inputs("a&b=c", "", "");
        assert_eq!(filter.build_query(), "?block_uuid=a%26b%3Dc");
    }
}
