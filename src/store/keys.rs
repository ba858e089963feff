/// 所有共享存储键的命名空间
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn recipients(&self, campaign_id: &str) -> String {
        format!("{}campaign:{}:recipients", self.prefix, campaign_id)
    }

    pub fn inflight(&self, campaign_id: &str) -> String {
        format!("{}campaign:{}:inflight", self.prefix, campaign_id)
    }

    pub fn dispatch_lock(&self, campaign_id: &str) -> String {
        format!("{}lock:campaign:{}", self.prefix, campaign_id)
    }

    pub fn kickoff_lock(&self, campaign_id: &str) -> String {
        format!("{}lock:kickoff:{}", self.prefix, campaign_id)
    }

    /// 重定向端的短窗口去重标记
    pub fn click_dedupe(&self, recipient_id: &str, link_id: &str) -> String {
        format!("{}d:{}:{}", self.prefix, recipient_id, link_id)
    }

    pub fn jobs(&self) -> String {
        format!("{}jobs", self.prefix)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("mailshot:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = KeySpace::new("ms:");
        assert_eq!(keys.recipients("42"), "ms:campaign:42:recipients");
        assert_eq!(keys.inflight("42"), "ms:campaign:42:inflight");
        assert_eq!(keys.dispatch_lock("42"), "ms:lock:campaign:42");
        assert_eq!(keys.kickoff_lock("42"), "ms:lock:kickoff:42");
        assert_eq!(keys.click_dedupe("r1", "l1"), "ms:d:r1:l1");
        assert_eq!(keys.jobs(), "ms:jobs");
    }
}
