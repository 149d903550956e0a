use std::io::Write;

use flexi_logger::{DeferredNow, Record};

/// `LEVEL target: message`, without timestamps.
pub fn cli_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{:<5} {}: {}",
        record.level(),
        record.target(),
        record.args()
    )
}
