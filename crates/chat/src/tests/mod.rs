//! Unit-Tests fuer ChatSession und Verlaufsexport
