#[macro_export]
macro_rules! wrapper {
    // Single expression (like a function name or closure)
    ($f:expr) => {{
        $f()
    }};
    ($f:expr, $( $args:expr $(,)? )* ) => {{
        $f( $($args,)* )
    }};
}

/// Calls the given function until it succeeds, waiting 5, 10 and 20 seconds between attempts.
/// The last result is returned whether it is a success or not.
#[macro_export]
macro_rules! retry {
    ($( $args:expr$(,)? )+) => {{
        let mut wait: u64 = 5;
        loop {
            let res = wrapper!($( $args, )*);
            if res.is_ok() || wait > 20 {
                break res;
            }
            if let Err(e) = &res {
                log::warn!("attempt failed, retrying in {}s: {}", wait, e);
            }
            thread::sleep(std::time::Duration::from_secs(wait));
            wait *= 2;
        }
    }};
}
