use chrono::{DateTime, Utc};
use wpt_core::NormalizedResult;

fn format_completed(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a result as a header block followed by one row per run.
pub fn render(result: &NormalizedResult) -> String {
    let info = &result.data.info;
    let mut out = String::new();

    out.push_str(&format!("Test:         {}\n", info.test_id));
    out.push_str(&format!(
        "Status:       {} {}\n",
        result.status_code, result.status_text
    ));
    out.push_str(&format!("Location:     {}\n", info.location));
    out.push_str(&format!(
        "Connectivity: {} ({}/{} Kbps, {} ms, plr {})\n",
        info.connectivity, info.bw_down, info.bw_up, info.latency, info.plr
    ));
    out.push_str(&format!(
        "Completed:    {}\n",
        format_completed(result.data.completed_at())
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:>4} {:>9} {:>7} {:>8} {:>11} {:>10} {:>9}\n",
        "run", "load_ms", "ttfb", "render", "speed_index", "bytes_out", "requests"
    ));

    for run in &result.data.runs {
        let m = &run.first_view.metrics;
        out.push_str(&format!(
            "{:>4} {:>9} {:>7} {:>8} {:>11} {:>10} {:>9}\n",
            run.id,
            m.load_time,
            m.ttfb,
            m.render,
            m.speed_index,
            m.bytes_out,
            m.requests.len()
        ));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedResult {
        wpt_core::normalize(
            br#"{"statusCode":200,"statusText":"Ok","data":{
                "testId":"abc123","location":"Dulles:Chrome","connectivity":"Cable",
                "bwDown":5000,"bwUp":1000,"latency":28,"plr":"0","completed":1425998347,
                "runs":{
                    "2":{"id":2,"firstView":{"loadTime":1100,"TTFB":290}},
                    "1":{"id":1,"firstView":{"loadTime":1000,"TTFB":300}}
                }}}"#,
        )
        .unwrap()
    }

    #[test]
    fn header_includes_test_metadata() {
        let out = render(&sample());
        assert!(out.contains("Test:         abc123"));
        assert!(out.contains("Status:       200 Ok"));
        assert!(out.contains("Cable (5000/1000 Kbps, 28 ms, plr 0)"));
        assert!(out.contains("Completed:    2015-03-10 14:39:07 UTC"));
    }

    #[test]
    fn rows_follow_run_order() {
        let out = render(&sample());
        let rows: Vec<&str> = out.lines().skip_while(|l| !l.contains("load_ms")).skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].trim_start().starts_with("1 "));
        assert!(rows[0].contains("1000"));
        assert!(rows[1].trim_start().starts_with("2 "));
    }

    #[test]
    fn layout_is_header_blank_line_then_table() {
        let out = render(&sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[5], "");
        assert!(lines[6].contains("speed_index"));
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn missing_completion_time_renders_dash() {
        let result = NormalizedResult::default();
        assert!(render(&result).contains("Completed:    -"));
    }
}
