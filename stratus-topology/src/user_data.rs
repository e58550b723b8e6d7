//! Boot-time shell script for the web servers

use std::fmt;

use crate::config::AssetLocation;

/// Install and start a PHP-capable Apache, then fetch the landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapScript {
    packages: Vec<String>,
    service: String,
    asset: AssetLocation,
    web_root: String,
}

impl BootstrapScript {
    pub fn new(asset: AssetLocation, web_root: impl Into<String>) -> Self {
        Self {
            packages: vec!["httpd".to_string(), "php".to_string(), "git".to_string()],
            service: "httpd".to_string(),
            asset,
            web_root: web_root.into(),
        }
    }

    fn destination(&self) -> String {
        format!("{}/{}", self.web_root.trim_end_matches('/'), self.asset.key)
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            "#!/bin/bash".to_string(),
            "yum update -y".to_string(),
            format!("yum install -y {}", self.packages.join(" ")),
            format!("systemctl start {}", self.service),
            format!("systemctl enable {}", self.service),
            format!("aws s3 cp {} {}", self.asset.uri(), self.destination()),
        ]
    }

    pub fn render(&self) -> String {
        let mut script = self.lines().join("\n");
        script.push('\n');
        script
    }
}

impl fmt::Display for BootstrapScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
