/// True when the release tag differs from the running version.
///
/// Plain string equality: `v1.0.0` and `1.0.0` are different versions, and a
/// lower tag still counts as an update.
pub fn is_update(current: &str, latest: &str) -> bool {
    current != latest
}
