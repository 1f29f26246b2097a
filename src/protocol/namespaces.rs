//! WS-Management namespace URIs and the prefixes used to query them.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const NS_SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_ADDRESSING: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
pub const NS_CIMBINDING: &str = "http://schemas.dmtf.org/wbem/wsman/1/cimbinding.xsd";
pub const NS_ENUM: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";
pub const NS_TRANSFER: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer";
pub const NS_WSMAN_DMTF: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
pub const NS_WSMAN_MSFT: &str = "http://schemas.microsoft.com/wbem/wsman/1/wsman.xsd";
pub const NS_SCHEMA_INST: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const NS_WIN_SHELL: &str = "http://schemas.microsoft.com/wbem/wsman/1/windows/shell";
pub const NS_WSMAN_FAULT: &str = "http://schemas.microsoft.com/wbem/wsman/1/wsmanfault";
pub const NS_POWERSHELL: &str = "http://schemas.microsoft.com/powershell/2004/04";

pub const NSP_SOAP_ENV: &str = "env";
pub const NSP_ADDRESSING: &str = "a";
pub const NSP_CIMBINDING: &str = "b";
pub const NSP_ENUM: &str = "n";
pub const NSP_TRANSFER: &str = "x";
pub const NSP_WSMAN_DMTF: &str = "w";
pub const NSP_WSMAN_MSFT: &str = "p";
pub const NSP_SCHEMA_INST: &str = "xsi";
pub const NSP_WIN_SHELL: &str = "rsp";
pub const NSP_WSMAN_FAULT: &str = "f";
pub const NSP_POWERSHELL: &str = "ps";

/// `State` attribute value marking a finished command.
pub const COMMAND_STATE_DONE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done";

/// Prefix to namespace URI table, built once and never modified.
static NAMESPACES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (NSP_SOAP_ENV, NS_SOAP_ENV),
        (NSP_ADDRESSING, NS_ADDRESSING),
        (NSP_CIMBINDING, NS_CIMBINDING),
        (NSP_ENUM, NS_ENUM),
        (NSP_TRANSFER, NS_TRANSFER),
        (NSP_WSMAN_DMTF, NS_WSMAN_DMTF),
        (NSP_WSMAN_MSFT, NS_WSMAN_MSFT),
        (NSP_SCHEMA_INST, NS_SCHEMA_INST),
        (NSP_WIN_SHELL, NS_WIN_SHELL),
        (NSP_WSMAN_FAULT, NS_WSMAN_FAULT),
        (NSP_POWERSHELL, NS_POWERSHELL),
    ])
});

/// Resolve a query prefix (`rsp`, `w`, `ps`, ...) to its namespace URI.
pub fn namespace(prefix: &str) -> Option<&'static str> {
    NAMESPACES.get(prefix).copied()
}

/// All prefix bindings, for transports that declare them on outgoing envelopes.
pub fn all_namespaces() -> &'static HashMap<&'static str, &'static str> {
    &NAMESPACES
}
