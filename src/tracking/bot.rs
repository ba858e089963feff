/// 机器人/链接预览启发式判断
#[derive(Debug, Clone)]
pub struct BotDetector {
    markers: Vec<String>,
    min_user_agent_len: usize,
}

impl BotDetector {
    pub fn new(markers: &[String], min_user_agent_len: usize) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            min_user_agent_len,
        }
    }

    /// 非 GET、缺少 UA、UA 过短或包含已知标记都视为机器人
    pub fn is_probable_bot(&self, is_get: bool, user_agent: Option<&str>) -> bool {
        if !is_get {
            return true;
        }
        let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return true;
        };
        if ua.chars().count() < self.min_user_agent_len {
            return true;
        }
        let ua = ua.to_lowercase();
        self.markers.iter().any(|marker| ua.contains(marker.as_str()))
    }
}

impl Default for BotDetector {
    fn default() -> Self {
        let config = crate::config::TrackingConfig::default();
        Self::new(&config.bot_user_agents, config.min_user_agent_len)
    }
}
