//! Project-wide constants.

/// Directory under the invoker root that holds the built predictor.
pub const DIST_DIR: &str = "dist";

/// File stem of the predictor executable. The platform suffix is appended.
pub const EXECUTABLE_STEM: &str = "exe";

/// Area used when the binary is run without arguments.
pub const DEFAULT_AREA: f64 = 5000.0;

/// Fallback message when the predictor reports failure without an `error` field.
pub const GENERIC_FAILURE: &str = "Prediction failed";

/// Remediation hint attached to a missing-executable error.
pub const BUILD_HINT: &str = "build the predictor executable into the dist directory first";

/// Platform-specific executable file name (`exe`, or `exe.exe` on Windows).
pub fn default_executable_name() -> String {
    format!("{}{}", EXECUTABLE_STEM, std::env::consts::EXE_SUFFIX)
}

/// Insert comma separators into a run of ASCII digits of any length
/// (e.g. 1234567 becomes 1,234,567).
pub fn group_digits(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_name_uses_platform_suffix() {
        let name = default_executable_name();
        assert!(name.starts_with(EXECUTABLE_STEM));
        assert!(name.ends_with(std::env::consts::EXE_SUFFIX));
        #[cfg(unix)]
        assert_eq!(name, "exe");
    }

    #[test]
    fn group_digits_short_runs_are_untouched() {
        assert_eq!(group_digits("0"), "0");
        assert_eq!(group_digits("42"), "42");
        assert_eq!(group_digits("999"), "999");
    }

    #[test]
    fn group_digits_thousands_and_millions() {
        assert_eq!(group_digits("1000"), "1,000");
        assert_eq!(group_digits("123456"), "123,456");
        assert_eq!(group_digits("1234567"), "1,234,567");
    }

    #[test]
    fn group_digits_beyond_u64() {
        assert_eq!(
            group_digits("100000000000000000000"),
            "100,000,000,000,000,000,000"
        );
        assert_eq!(group_digits(""), "");
    }
}
