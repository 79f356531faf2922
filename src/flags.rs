use std::path::PathBuf;

xflags::xflags! {
    /// Store and query subject-property-object triples.
    cmd triplestore {
        /// TOML configuration file.
        optional -c, --config path: PathBuf
        /// Data directory, overriding `store.path` from the configuration.
        optional --data path: PathBuf
        /// Additional prefix binding, written as `name=iri`.
        repeated --prefix binding: String

        /// Store a triple, replacing the subject's previous object for the property.
        cmd push {
            required subject: String
            required property: String
            required object: String
        }
        /// Remove one property, a subject, a property from every subject, or everything.
        cmd remove {
            optional --subject subject: String
            optional --property property: String
        }
        /// List subjects, optionally filtered by property and value.
        cmd subjects {
            optional --property property: String
            optional --value value: String
        }
        /// List the properties of a subject, or of every subject.
        cmd properties {
            optional --subject subject: String
        }
        /// List objects, optionally restricted to a subject and property.
        cmd values {
            optional --subject subject: String
            optional --property property: String
        }
        /// Print every stored record.
        cmd show {}
        /// Print every triple.
        cmd dump {}
        /// Read commands from standard input.
        cmd repl {}
    }
}
