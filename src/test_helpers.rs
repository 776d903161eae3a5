use assert_call::call;

/// Records `name` with `call!` when dropped.
pub struct DropProbe(&'static str);

impl Drop for DropProbe {
    fn drop(&mut self) {
        call!("{}", self.0);
    }
}

pub fn drop_probe(name: &'static str) -> DropProbe {
    DropProbe(name)
}
