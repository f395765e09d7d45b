use crate::core::Mogram;

/// Copies the current value at each persister's source path into its slot, for the
/// unit and all of its descendants.
pub(crate) fn post_process(mogram: &Mogram) {
    mogram.for_each_mogram(&mut |m| {
        for persister in m.persisters() {
            match m.context().get_value(persister.source_path()) {
                Some(value) => persister.store(value.clone()),
                None => log::debug!(
                    "Nothing to persist at '{}' in '{}'",
                    persister.source_path(),
                    m.name()
                ),
            }
        }
    });
}
