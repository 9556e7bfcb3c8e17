use log::LevelFilter;

/// Verbosity from the number of `-v` flags.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn stderr(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}: [{}] {}",
                record.level().to_string().to_lowercase(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr())
}

/// Install the global logger. Fails if one is already set.
pub fn init(level: LevelFilter) -> Result<(), String> {
    stderr(level)
        .apply()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Debug);
        assert_eq!(level_for(2), LevelFilter::Trace);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }
}
