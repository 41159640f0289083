use super::Serializer;

use quarry_core::driver::Capability;

impl Serializer {
    pub fn sqlite() -> Serializer {
        Serializer::for_capability(&Capability::SQLITE)
    }

    pub fn postgresql() -> Serializer {
        Serializer::for_capability(&Capability::POSTGRESQL)
    }

    pub fn mysql() -> Serializer {
        Serializer::for_capability(&Capability::MYSQL)
    }

    pub fn for_capability(capability: &'static Capability) -> Serializer {
        Serializer { capability }
    }
}
