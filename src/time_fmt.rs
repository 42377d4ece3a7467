/// Formats a duration in milliseconds as `HH:MM:SS`.
///
/// Sub-second remainders are dropped. Every field is padded to at least two
/// digits, hours are never truncated.
pub fn format_elapsed(millis: u64) -> String {
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(999), "00:00:00");
        assert_eq!(format_elapsed(1000), "00:00:01");
        assert_eq!(format_elapsed(59_999), "00:00:59");
        assert_eq!(format_elapsed(60_000), "00:01:00");
        assert_eq!(format_elapsed(3_661_000), "01:01:01");
        assert_eq!(format_elapsed(360_000_000), "100:00:00");
    }

    proptest! {
        #[test]
        fn ignores_sub_second_part(secs in 0u64..10_000_000, rem in 0u64..1000) {
            prop_assert_eq!(format_elapsed(secs * 1000 + rem), format_elapsed(secs * 1000));
        }

        #[test]
        fn fields_are_padded_and_consistent(millis in 0u64..u64::MAX / 2) {
            let text = format_elapsed(millis);
            let fields: Vec<&str> = text.split(':').collect();
            prop_assert_eq!(fields.len(), 3);
            for field in &fields {
                prop_assert!(field.len() >= 2);
                prop_assert!(field.chars().all(|c| c.is_ascii_digit()));
            }

            let h: u64 = fields[0].parse().unwrap();
            let m: u64 = fields[1].parse().unwrap();
            let s: u64 = fields[2].parse().unwrap();
            prop_assert!(m < 60 && s < 60);
            prop_assert_eq!(h * 3600 + m * 60 + s, millis / 1000);
        }
    }
}
