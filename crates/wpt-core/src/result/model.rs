use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// The outer object returned by `jsonResult.php`.
///
/// `data` is only populated when `status_code` is 200; for pending or unknown
/// tests the service omits it and it decodes to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEnvelope {
    #[serde(rename = "statusCode", deserialize_with = "null_default")]
    pub status_code: i64,
    #[serde(rename = "statusText", deserialize_with = "null_default")]
    pub status_text: String,
    #[serde(deserialize_with = "null_default")]
    pub completed: f64,
    #[serde(deserialize_with = "null_default")]
    pub data: RawRunSet,
}

/// The `data` object of the envelope, with runs still keyed by index string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRunSet {
    #[serde(flatten)]
    pub info: TestInfo,
    #[serde(deserialize_with = "unique_runs")]
    pub runs: HashMap<String, Run>,
}

// ---------------------------------------------------------------------------
// TestInfo
// ---------------------------------------------------------------------------

/// Scalar metadata describing a test as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestInfo {
    #[serde(rename = "testId", deserialize_with = "null_default")]
    pub test_id: String,
    #[serde(deserialize_with = "null_default")]
    pub summary: String,
    /// Test location label, e.g. `Dulles:Chrome`.
    #[serde(deserialize_with = "null_default")]
    pub location: String,
    /// Connectivity profile name, e.g. `Cable`.
    #[serde(deserialize_with = "null_default")]
    pub connectivity: String,
    /// Downstream bandwidth in Kbps.
    #[serde(rename = "bwDown", deserialize_with = "null_default")]
    pub bw_down: i64,
    /// Upstream bandwidth in Kbps.
    #[serde(rename = "bwUp", deserialize_with = "null_default")]
    pub bw_up: i64,
    /// Added round-trip latency in milliseconds.
    #[serde(deserialize_with = "null_default")]
    pub latency: i64,
    /// Packet loss rate. The service sends it as a string.
    #[serde(deserialize_with = "null_default")]
    pub plr: String,
    /// Unix timestamp (seconds) at which the test finished.
    #[serde(deserialize_with = "null_default")]
    pub completed: f64,
    #[serde(rename = "successfulFVRuns", deserialize_with = "null_default")]
    pub successful_fv_runs: i64,
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// One entry of the `runs` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Run {
    #[serde(deserialize_with = "null_default")]
    pub id: i64,
    #[serde(rename = "firstView", deserialize_with = "null_default")]
    pub first_view: RunView,
}

/// Metrics and artifact links for one view (cold cache) of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunView {
    #[serde(flatten)]
    pub metrics: RunMetrics,
    #[serde(deserialize_with = "null_default")]
    pub pages: Pages,
    #[serde(deserialize_with = "null_default")]
    pub thumbnails: Thumbnails,
    #[serde(deserialize_with = "null_default")]
    pub images: Images,
    #[serde(rename = "rawData", deserialize_with = "null_default")]
    pub raw_data: RawData,
    #[serde(rename = "videoFrames", deserialize_with = "null_default")]
    pub video_frames: Vec<VideoFrame>,
}

/// The flat metric block of a view. Times are milliseconds unless noted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetrics {
    #[serde(deserialize_with = "null_default")]
    pub run: i64,
    #[serde(rename = "URL", deserialize_with = "null_default")]
    pub url: String,
    #[serde(rename = "loadTime", deserialize_with = "null_default")]
    pub load_time: i64,
    #[serde(rename = "TTFB", deserialize_with = "null_default")]
    pub ttfb: i64,
    #[serde(rename = "bytesOut", deserialize_with = "null_default")]
    pub bytes_out: i64,
    #[serde(rename = "bytesOutDoc", deserialize_with = "null_default")]
    pub bytes_out_doc: i64,
    #[serde(deserialize_with = "null_default")]
    pub connections: i64,
    /// Per-request detail; kept opaque.
    #[serde(deserialize_with = "null_default")]
    pub requests: Vec<serde_json::Value>,
    #[serde(rename = "requestsDoc", deserialize_with = "null_default")]
    pub requests_doc: i64,
    #[serde(deserialize_with = "null_default")]
    pub responses_200: i64,
    #[serde(deserialize_with = "null_default")]
    pub responses_404: i64,
    #[serde(deserialize_with = "null_default")]
    pub responses_other: i64,
    #[serde(deserialize_with = "null_default")]
    pub result: i64,
    #[serde(deserialize_with = "null_default")]
    pub render: i64,
    #[serde(rename = "fullyLoaded", deserialize_with = "null_default")]
    pub fully_loaded: i64,
    #[serde(deserialize_with = "null_default")]
    pub cached: i64,
    #[serde(rename = "docTime", deserialize_with = "null_default")]
    pub doc_time: i64,
    #[serde(rename = "domTime", deserialize_with = "null_default")]
    pub dom_time: i64,

    #[serde(deserialize_with = "null_default")]
    pub score_cache: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_cdn: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_gzip: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_cookies: i64,
    #[serde(rename = "score_keep-alive", deserialize_with = "null_default")]
    pub score_keep_alive: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_minify: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_combine: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_compress: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_etags: i64,
    #[serde(deserialize_with = "null_default")]
    pub score_progressive_jpeg: i64,

    #[serde(deserialize_with = "null_default")]
    pub gzip_total: f64,
    #[serde(deserialize_with = "null_default")]
    pub gzip_savings: i64,
    #[serde(deserialize_with = "null_default")]
    pub minify_total: i64,
    #[serde(deserialize_with = "null_default")]
    pub minify_savings: i64,
    #[serde(deserialize_with = "null_default")]
    pub image_total: i64,
    #[serde(deserialize_with = "null_default")]
    pub image_savings: i64,
    #[serde(deserialize_with = "null_default")]
    pub optimization_checked: i64,

    #[serde(deserialize_with = "null_default")]
    pub aft: i64,
    #[serde(rename = "domElements", deserialize_with = "null_default")]
    pub dom_elements: i64,
    #[serde(rename = "pageSpeedVersion", with = "string_float")]
    pub page_speed_version: f64,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(rename = "titleTime", deserialize_with = "null_default")]
    pub title_time: i64,
    #[serde(rename = "loadEventStart", deserialize_with = "null_default")]
    pub load_event_start: i64,
    #[serde(rename = "loadEventEnd", deserialize_with = "null_default")]
    pub load_event_end: i64,
    #[serde(rename = "domContentLoadedEventStart", deserialize_with = "null_default")]
    pub dom_content_loaded_event_start: i64,
    #[serde(rename = "domContentLoadedEventEnd", deserialize_with = "null_default")]
    pub dom_content_loaded_event_end: i64,
    #[serde(rename = "lastVisualChange", deserialize_with = "null_default")]
    pub last_visual_change: i64,
    #[serde(rename = "firstPaint", deserialize_with = "null_default")]
    pub first_paint: i64,
    #[serde(rename = "SpeedIndex", deserialize_with = "null_default")]
    pub speed_index: i64,
    #[serde(rename = "visualComplete", deserialize_with = "null_default")]
    pub visual_complete: i64,

    #[serde(deserialize_with = "null_default")]
    pub browser_name: String,
    #[serde(deserialize_with = "null_default")]
    pub browser_version: String,
    #[serde(deserialize_with = "null_default")]
    pub server_count: i64,
    #[serde(deserialize_with = "null_default")]
    pub server_rtt: i64,
    #[serde(deserialize_with = "null_default")]
    pub base_page_cdn: String,
    #[serde(deserialize_with = "null_default")]
    pub adult_site: i64,
    #[serde(deserialize_with = "null_default")]
    pub fixed_viewport: i64,

    #[serde(rename = "docCPUms", deserialize_with = "null_default")]
    pub doc_cpu_ms: f64,
    #[serde(rename = "fullyLoadedCPUms", deserialize_with = "null_default")]
    pub fully_loaded_cpu_ms: f64,
    #[serde(rename = "docCPUpct", deserialize_with = "null_default")]
    pub doc_cpu_pct: f64,
    #[serde(rename = "fullyLoadedCPUpct", deserialize_with = "null_default")]
    pub fully_loaded_cpu_pct: f64,
    /// Unix timestamp (seconds) of the run.
    #[serde(deserialize_with = "null_default")]
    pub date: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pages {
    #[serde(deserialize_with = "null_default")]
    pub details: String,
    #[serde(deserialize_with = "null_default")]
    pub checklist: String,
    #[serde(deserialize_with = "null_default")]
    pub breakdown: String,
    #[serde(deserialize_with = "null_default")]
    pub domains: String,
    #[serde(rename = "screenShot", deserialize_with = "null_default")]
    pub screen_shot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    #[serde(deserialize_with = "null_default")]
    pub waterfall: String,
    #[serde(deserialize_with = "null_default")]
    pub checklist: String,
    #[serde(rename = "screenShot", deserialize_with = "null_default")]
    pub screen_shot: String,
}

/// Full-size images: the thumbnail set plus the connection view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    #[serde(flatten)]
    pub thumbnails: Thumbnails,
    #[serde(rename = "connectionView", deserialize_with = "null_default")]
    pub connection_view: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawData {
    #[serde(deserialize_with = "null_default")]
    pub headers: String,
    #[serde(rename = "pageData", deserialize_with = "null_default")]
    pub page_data: String,
    #[serde(rename = "requestsData", deserialize_with = "null_default")]
    pub requests_data: String,
    #[serde(deserialize_with = "null_default")]
    pub utilization: String,
}

/// A single filmstrip frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoFrame {
    /// Offset from the start of the run, in milliseconds.
    #[serde(deserialize_with = "null_default")]
    pub time: i64,
    #[serde(deserialize_with = "null_default")]
    pub image: String,
    /// Percentage of visual completeness at this frame.
    #[serde(rename = "VisuallyComplete", alias = "visuallyComplete", deserialize_with = "null_default")]
    pub visually_complete: i64,
}

// ---------------------------------------------------------------------------
// Normalized output
// ---------------------------------------------------------------------------

/// A decoded result with `runs` reshaped into an ordered sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(rename = "statusText")]
    pub status_text: String,
    pub data: TestResult,
}

impl NormalizedResult {
    /// The service reports 200 once every run has finished; 1xx codes mean
    /// the test is still queued or running.
    pub fn is_complete(&self) -> bool {
        self.status_code == 200
    }
}

/// Test metadata plus runs in ascending run-index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(flatten)]
    pub info: TestInfo,
    pub runs: Vec<Run>,
}

impl TestResult {
    /// When the test finished, or `None` if the timestamp is zero or out of range.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        let ts = self.info.completed;
        if !ts.is_finite() || ts <= 0.0 {
            return None;
        }
        let secs = ts.trunc() as i64;
        let nanos = (ts.fract() * 1_000_000_000.0) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }

    pub fn first_views(&self) -> impl Iterator<Item = &RunView> {
        self.runs.iter().map(|run| &run.first_view)
    }
}

/// Reads `null` as the zero value, the same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Collects `runs` without letting a repeated key replace an earlier run.
fn unique_runs<'de, D>(deserializer: D) -> Result<HashMap<String, Run>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueRuns;

    impl<'de> de::Visitor<'de> for UniqueRuns {
        type Value = HashMap<String, Run>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an object of runs keyed by run index")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(HashMap::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let mut runs = HashMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(key) = map.next_key::<String>()? {
                let run = map.next_value::<Option<Run>>()?.unwrap_or_default();
                if runs.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate run key {key:?}")));
                }
                runs.insert(key, run);
            }
            Ok(runs)
        }
    }

    deserializer.deserialize_any(UniqueRuns)
}

/// `pageSpeedVersion` arrives as a JSON string holding a float. Plain numbers
/// are accepted too; an empty string or `null` reads as zero.
mod string_float {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringFloat;

        impl<'de> de::Visitor<'de> for StringFloat {
            type Value = f64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a float or a string containing a float")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
                Ok(0.0)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(StringFloat)
    }
}
