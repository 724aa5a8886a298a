//! Macros for creating diagnostic messages.

/// Create a generic error (code K-0-99) tagged with the calling file and line.
///
/// ```
/// use kml_error_reporting::generic_error;
///
/// let error = generic_error!("Found unexpected attribute");
/// assert_eq!(error.code.as_deref(), Some("K-0-99"));
/// assert!(error.title.contains(file!()));
/// ```
#[macro_export]
macro_rules! generic_error {
    ($message:expr) => {
        $crate::DiagnosticMessageBuilder::generic_error($message, file!(), line!())
    };
}
