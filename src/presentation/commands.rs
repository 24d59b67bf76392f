// Operator command parsing for the interactive console
use crate::domain::reading::Metric;
use crate::infrastructure::serial::SerialConfig;
use std::path::PathBuf;

/// A control action typed by the operator. These map one-to-one onto the
/// controls of the dashboard UI this client replaces.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    SelectMetric(Metric),
    /// Rolling window in seconds; 0 disables the window.
    SetWindow(u64),
    Pause,
    Resume,
    Clear,
    Export(PathBuf),
    ShowSerial,
    ApplySerial(SerialConfig),
}

const USAGE: &str = "commands: metric <name> | window <secs> | pause | resume | clear | export [path] | serial [port [baud [timeout]]]";

/// Parse one input line. Blank lines are ignored.
pub fn parse(line: &str) -> Result<Option<OperatorCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let cmd = match verb {
        "metric" => {
            let name = words.next().ok_or_else(|| USAGE.to_string())?;
            let metric = Metric::from_key(name)
                .ok_or_else(|| format!("unknown metric '{name}' ({USAGE})"))?;
            OperatorCommand::SelectMetric(metric)
        }
        "window" => {
            let secs = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or_else(|| USAGE.to_string())?;
            OperatorCommand::SetWindow(secs)
        }
        "pause" => OperatorCommand::Pause,
        "resume" => OperatorCommand::Resume,
        "clear" => OperatorCommand::Clear,
        "export" => {
            let path = words.next().unwrap_or("sensor_data.csv");
            OperatorCommand::Export(PathBuf::from(path))
        }
        "serial" => match words.next() {
            None => OperatorCommand::ShowSerial,
            Some(port) => {
                let defaults = SerialConfig::default();
                let baud = match words.next() {
                    Some(w) => w.parse().map_err(|_| USAGE.to_string())?,
                    None => defaults.baud,
                };
                let timeout = match words.next() {
                    Some(w) => w.parse().map_err(|_| USAGE.to_string())?,
                    None => defaults.timeout,
                };
                OperatorCommand::ApplySerial(SerialConfig {
                    port: port.to_string(),
                    baud,
                    timeout,
                })
            }
        },
        other => return Err(format!("unknown command '{other}' ({USAGE})")),
    };

    if words.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(Some(cmd))
}
