/// Display id of a carta (`id_sumary_carta`), the number readers see in URLs.
/// The storage row carries a separate real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartaId(i32);

impl CartaId {
    pub fn parse(value: i64) -> Result<Self, String> {
        match i32::try_from(value) {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(format!("{value} is not a valid carta id.")),
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for CartaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
