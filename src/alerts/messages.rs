//! Alert message formatting
//!
//! Builds the Slack-markdown bodies for each alert kind. The transport
//! wraps these in the kind header and timestamp footer.

use crate::config::Config;
use crate::events::LogEvent;

fn field_or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

/// Body for a failover alert (primary stopped serving, backup took over)
pub fn failover(event: &LogEvent, from_pool: &str) -> String {
    format!(
        "*Event:* Primary pool has failed\n\n\
         *Pool Change:*\n\
         • *Primary Pool (was serving):* `{from}`\n\
         • *Backup Pool (now serving):* `{to}`\n\
         • *Release ID:* `{release}`\n\
         • *Upstream:* `{upstream}`\n\
         • *Time:* `{time}`\n\n\
         *What Happened:*\n\
         The primary pool (`{from}`) failed health checks or returned errors. \
         Traffic automatically switched to the backup pool (`{to}`).\n\n\
         *Actions Required:*\n\
         1. Check primary container health: `docker logs app_{from} --tail 50`\n\
         2. Verify container status: `docker ps | grep app_{from}`\n\
         3. Investigate the root cause, fix, and wait for automatic recovery",
        from = from_pool,
        to = event.pool,
        release = field_or_unknown(event.release.as_deref()),
        upstream = field_or_unknown(event.upstream_addr.as_deref()),
        time = event.timestamp,
    )
}

/// Body for a recovery alert (primary resumed serving)
pub fn recovery(event: &LogEvent, from_pool: &str) -> String {
    format!(
        "*Event:* Primary pool has been restored\n\n\
         *Pool Change:*\n\
         • *Backup Pool (was serving):* `{from}`\n\
         • *Primary Pool (now serving):* `{to}`\n\
         • *Release ID:* `{release}`\n\
         • *Upstream:* `{upstream}`\n\
         • *Time:* `{time}`\n\n\
         *What Happened:*\n\
         The primary pool (`{to}`) has recovered and passed health checks. \
         Traffic automatically returned to the primary pool.\n\n\
         *Post-Recovery Actions:*\n\
         1. Monitor primary pool stability: `docker logs app_{to} --tail 50`\n\
         2. Verify no errors over the next 15 minutes\n\
         3. Document the incident and root cause",
        from = from_pool,
        to = event.pool,
        release = field_or_unknown(event.release.as_deref()),
        upstream = field_or_unknown(event.upstream_addr.as_deref()),
        time = event.timestamp,
    )
}

/// Body for an error-rate alert
pub fn error_rate(
    rate: f64,
    threshold: f64,
    error_count: usize,
    window_size: usize,
    event: &LogEvent,
) -> String {
    format!(
        "*Metrics:*\n\
         • *Error Rate:* `{rate:.2}%` (Threshold: `{threshold}%`)\n\
         • *Errors:* `{errors}` out of `{window}` requests\n\
         • *Current Pool:* `{pool}`\n\
         • *Release ID:* `{release}`\n\
         • *Time:* `{time}`\n\n\
         *What This Means:*\n\
         The application is returning elevated 5xx rates. This may indicate \
         bugs, resource exhaustion, or infrastructure problems.\n\n\
         *Immediate Actions:*\n\
         1. Check application logs: `docker logs app_{pool} --tail 100`\n\
         2. Check resource usage: `docker stats app_{pool} --no-stream`\n\
         3. Review recent deployments; consider a manual pool toggle if errors persist",
        rate = rate,
        threshold = threshold,
        errors = error_count,
        window = window_size,
        pool = event.pool,
        release = field_or_unknown(event.release.as_deref()),
        time = event.timestamp,
    )
}

/// Body for the startup announcement
pub fn startup(config: &Config) -> String {
    format!(
        "*Pool watcher started*\n\n\
         *Configuration:*\n\
         • Monitoring: `{file}`\n\
         • Error Threshold: `{threshold}%`\n\
         • Window Size: `{window}` requests\n\
         • Cooldown: `{cooldown}s`\n\
         • Primary Pool: `{primary}`\n\
         • Backup Pool: `{backup}`\n\n\
         *Status:* Monitoring active and ready to detect failovers",
        file = config.log_file.display(),
        threshold = config.error_rate_threshold,
        window = config.window_size,
        cooldown = config.alert_cooldown_sec,
        primary = config.primary_pool,
        backup = config.backup_pool,
    )
}
