//! Contact and social links published alongside the portfolio pages.

use serde::Serialize;

#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContactProfile {
    pub email: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub cv_download_url: Option<String>,
}

impl ContactProfile {
    /// `https://wa.me/` link built from the configured number.
    pub fn whatsapp_url(&self) -> Option<String> {
        self.whatsapp_number
            .as_deref()
            .map(|number| number.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty())
            .map(|digits| format!("https://wa.me/{}", digits))
    }
}
