use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical audit parameters, flattened from their OpenRTB paths with `_`.
///
/// The order is significant: it is reproduced verbatim in prompts and every
/// filtered subset keeps it.
pub const MASTER_PARAMETER_LIST: &[&str] = &[
    "_at",
    "app_cat",
    "app_content_id",
    "app_content_livestream",
    "app_content_producer_name",
    "app_content_title",
    "app_domain",
    "app_id",
    "app_name",
    "app_publisher_cat",
    "app_publisher_id",
    "app_publisher_name",
    "app_storeurl",
    "cur",
    "device_dnt",
    "device_geo_lat",
    "device_geo_lon",
    "device_geo_type",
    "device_ifa",
    "device_ip",
    "device_ipv6",
    "device_lmt",
    "device_ua",
    "id",
    "imp_banner_format",
    "imp_banner_format_h",
    "imp_banner_format_w",
    "imp_banner_pos",
    "imp_banner_w",
    "imp_bidfloor",
    "imp_bidfloorcur",
    "imp_id",
    "imp_secure",
    "imp_ssai",
    "imp_video_api",
    "imp_video_h",
    "imp_video_maxseq",
    "imp_video_minduration",
    "imp_video_podid",
    "imp_video_podseq",
    "imp_video_pos",
    "imp_video_protocols",
    "imp_video_slotinpod",
    "imp_video_startdelay",
    "imp_video_w",
    // Spelled "mp_banner_h" in older copies of this list.
    "imp_banner_h",
    "regs_coppa",
    "regs_ext_gdpr",
    "regs_ext_us_privacy",
    "site_cat",
    "site_domain",
    "site_id",
    "site_page",
    "site_publisher_id",
    "site_publisher_name",
    "site_ref",
    "source_ext_schain",
    "source_pchain",
    "tmax",
    "user_buyeruid",
    "user_ext_consent",
    "user_geo",
    "user_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    App,
    Site,
}

impl MediaType {
    pub fn key(self) -> &'static str {
        match self {
            MediaType::App => "app",
            MediaType::Site => "site",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Banner,
    Video,
}

impl AdType {
    pub fn key(self) -> &'static str {
        match self {
            AdType::Banner => "banner",
            AdType::Video => "video",
        }
    }
}

impl fmt::Display for AdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which request context a master entry belongs to, derived from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterScope {
    App,
    Site,
    Banner,
    Video,
    Common,
}

impl ParameterScope {
    pub fn of(parameter: &str) -> Self {
        if parameter.starts_with("app_") {
            ParameterScope::App
        } else if parameter.starts_with("site_") {
            ParameterScope::Site
        } else if parameter.starts_with("imp_banner_") {
            ParameterScope::Banner
        } else if parameter.starts_with("imp_video_") {
            ParameterScope::Video
        } else {
            ParameterScope::Common
        }
    }

    pub fn applies_to(self, media_type: MediaType, ad_type: AdType) -> bool {
        match self {
            ParameterScope::App => media_type == MediaType::App,
            ParameterScope::Site => media_type == MediaType::Site,
            ParameterScope::Banner => ad_type == AdType::Banner,
            ParameterScope::Video => ad_type == AdType::Video,
            ParameterScope::Common => true,
        }
    }
}

/// Filters `master` down to the entries that make sense for a request of the
/// given media type and ad type. Order is preserved.
pub fn relevant_parameters<'a>(
    master: &[&'a str],
    media_type: MediaType,
    ad_type: AdType,
) -> Vec<&'a str> {
    master
        .iter()
        .copied()
        .filter(|param| ParameterScope::of(param).applies_to(media_type, ad_type))
        .collect()
}
