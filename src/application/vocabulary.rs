//! Service and negative response code names for logs and reports.
//!
//! Lookups never fail: identifiers missing from the tables resolve to the
//! `UNKNOWN_*` entries, which carry the id `0xFF`.

#[derive(Debug, PartialEq, Eq)]
pub struct SubFunctionInfo {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    pub sid: u8,
    pub mnemonic: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub sub_functions: &'static [SubFunctionInfo],
}

impl ServiceInfo {
    pub fn sub_function(&self, id: u8) -> Option<&SubFunctionInfo> {
        self.sub_functions.iter().find(|sub| sub.id == id)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct NrcInfo {
    pub code: u8,
    pub mnemonic: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub static UNKNOWN_SERVICE: ServiceInfo = ServiceInfo {
    sid: 0xFF,
    mnemonic: "Unknown SID",
    name: "Unknown SID",
    description: "Unknown SID",
    sub_functions: &[],
};

pub static UNKNOWN_SUB_FUNCTION: SubFunctionInfo = SubFunctionInfo {
    id: 0xFF,
    name: "Unknown SubFunc",
    description: "Unknown SubFunc",
};

pub static UNKNOWN_NRC: NrcInfo = NrcInfo {
    code: 0xFF,
    mnemonic: "Unknown NRC",
    name: "Unknown NRC",
    description: "Unknown NRC",
};

/// Service table. ECUReset sub-functions follow ISO 14229-1 numbering.
static SERVICES: &[ServiceInfo] = &[
    ServiceInfo {
        sid: 0x10,
        mnemonic: "DSC",
        name: "DiagnosticSessionControl",
        description: "DiagnosticSessionControl service is used to change diagnostic sessions in the server(s). In each diagnostic session, a different set of diagnostic services (and/or functionalities) is enabled in the server. The server shall always be in exactly one diagnostic session.",
        sub_functions: &[
            SubFunctionInfo {
                id: 0x01,
                name: "DefaultSession",
                description: "Default Session",
            },
            SubFunctionInfo {
                id: 0x02,
                name: "ProgrammingSession",
                description: "Programming Session",
            },
            SubFunctionInfo {
                id: 0x03,
                name: "ExtendedSession",
                description: "Extended Session",
            },
            SubFunctionInfo {
                id: 0x04,
                name: "SystemSafetyDiagnosticSession",
                description: "System Safety Diagnostic Session",
            },
        ],
    },
    ServiceInfo {
        sid: 0x11,
        mnemonic: "ER",
        name: "ECUReset",
        description: "ECUReset service is used by the client to request a server reset.",
        sub_functions: &[
            SubFunctionInfo {
                id: 0x01,
                name: "HardReset",
                description: "Perform a hard reset",
            },
            SubFunctionInfo {
                id: 0x02,
                name: "KeyOffOnReset",
                description: "Perform a key off/on reset",
            },
            SubFunctionInfo {
                id: 0x03,
                name: "SoftReset",
                description: "Perform a soft reset",
            },
            SubFunctionInfo {
                id: 0x04,
                name: "EnableRapidPowerShutDown",
                description: "Enable rapid power shut down",
            },
            SubFunctionInfo {
                id: 0x05,
                name: "DisableRapidPowerShutDown",
                description: "Disable rapid power shut down",
            },
        ],
    },
    ServiceInfo {
        sid: 0x14,
        mnemonic: "CDI",
        name: "ClearDiagnosticInformation",
        description: "ClearDiagnosticInformation service is used by the client to clear all diagnostic information (DTC and related data) in one or multiple servers' memory.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x19,
        mnemonic: "RDTCI",
        name: "ReadDTCInformation",
        description: "ReadDTCInformation service allows the client to read from any server or group of servers within a vehicle, current information about all Diagnostic Trouble Codes. This could be the status of reported Diagnostic Trouble Code (DTC), the number of currently active DTCs, or any other information returned by supported ReadDTCInformation SubFunctions.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x22,
        mnemonic: "RDBI",
        name: "ReadDataByIdentifier",
        description: "ReadDataByIdentifier service allows the client to request data record values from the server identified by one or more DataIdentifiers (DIDs).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x23,
        mnemonic: "RMB",
        name: "ReadMemoryByAddress",
        description: "ReadMemoryByAddress service allows the client to request server's memory data stored under the provided memory address.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x24,
        mnemonic: "RSDI",
        name: "ReadScalingDataByIdentifier",
        description: "ReadScalingDataByIdentifier service allows the client to request from the server a scaling data record identified by a DataIdentifier (DID). The scaling data contains information such as data record type (e.g., ASCII, signed float), formula and its coefficients used for value calculation, units, etc.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x27,
        mnemonic: "SA",
        name: "SecurityAccess",
        description: "SecurityAccess service allows the client to unlock functions/services with restricted access.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x28,
        mnemonic: "CC",
        name: "CommunicationControl",
        description: "CommunicationControl service allows the client to switch on/off the transmission and/or the reception of certain messages on a server(s).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x29,
        mnemonic: "AU",
        name: "Authentication",
        description: "Authentication service provides a means for the client to prove its identity, allowing it to access data and/or diagnostic services, which have restricted access for, for example security, emissions, or safety reasons.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x2A,
        mnemonic: "RDBPI",
        name: "ReadDataByPeriodicIdentifier",
        description: "ReadDataByPeriodicIdentifier service allows the client to request the periodic transmission of data record values from the server identified by one or more periodicDataIdentifiers.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x2C,
        mnemonic: "DDDI",
        name: "DynamicallyDefineDataIdentifier",
        description: "DynamicallyDefineDataIdentifier service allows the client to dynamically define in a server a DataIdentifier (DID) that can be read via the ReadDataByIdentifier_ service at a later time.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x2E,
        mnemonic: "WDBI",
        name: "WriteDataByIdentifier",
        description: "WriteDataByIdentifier service allows the client to write information into the server at an internal location specified by the provided DataIdentifier (DID).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x2F,
        mnemonic: "IOCBID",
        name: "InputOutputControlByIdentifier",
        description: "InputOutputControlByIdentifier service allows the client to substitute a value for an input signal, internal server function and/or force control to a value for an output (actuator) of an electronic system.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x31,
        mnemonic: "RC",
        name: "RoutineControl",
        description: "RoutineControl service allows the client to execute a defined sequence of steps to obtain any relevant result. There is a lot of flexibility with this service, but typical usage may include functionality such as erasing memory, resetting or learning adaptive data, running a self-test, overriding the normal server control strategy.",
        sub_functions: &[
            SubFunctionInfo {
                id: 0x01,
                name: "StartRoutine",
                description: "Start routine",
            },
            SubFunctionInfo {
                id: 0x02,
                name: "StopRoutine",
                description: "Stop routine",
            },
            SubFunctionInfo {
                id: 0x03,
                name: "RequestRoutineResults",
                description: "Routine result",
            },
        ],
    },
    ServiceInfo {
        sid: 0x34,
        mnemonic: "RD",
        name: "RequestDownload",
        description: "RequestDownload service allows the client to initiate a data transfer from the client to the server (download).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x35,
        mnemonic: "RU",
        name: "RequestUpload",
        description: "RequestUpload service allows the client to initiate a data transfer from the server to the client (upload).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x36,
        mnemonic: "TD",
        name: "TransferData",
        description: "TransferData service is used by the client to transfer data either from the client to the server (download) or from the server to the client (upload).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x37,
        mnemonic: "RTE",
        name: "RequestTransferExit",
        description: "RequestTransferExit service is used by the client to terminate a data transfer between the client and server.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x38,
        mnemonic: "RFT",
        name: "RequestFileTransfer",
        description: "RequestFileTransfer service allows the client to initiate a file data transfer either from the server to the client (upload) or from the server to the client (upload).",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x3D,
        mnemonic: "WMB",
        name: "WriteMemoryByAddress",
        description: "WriteMemoryByAddress service allows the client to write information into the server's memory data under the provided memory address.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x3E,
        mnemonic: "TP",
        name: "TesterPresent",
        description: "TesterPresent service is used by the client to indicate to a server(s) that the client is still connected to a vehicle and certain diagnostic services and/or communication that have been previously activated are to remain active.",
        sub_functions: &[
            SubFunctionInfo {
                id: 0x00,
                name: "ZeroSubFunction",
                description: "Tester present",
            },
        ],
    },
    ServiceInfo {
        sid: 0x84,
        mnemonic: "SDT",
        name: "SecuredDataTransmission",
        description: "SecuredDataTransmission service is applicable if a client intends to use diagnostic services defined in this document in a secured mode. It may also be used to transmit external data, which conform to some other application protocol, in a secured mode between a client and a server. A secured mode in this context means that the data transmitted is protected by cryptographic methods.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x85,
        mnemonic: "CDTCS",
        name: "ControlDTCSetting",
        description: "ControlDTCSetting service allows the client to stop or resume the updating of DTC status bits in the server(s) memory.",
        sub_functions: &[
            SubFunctionInfo {
                id: 0x01,
                name: "On",
                description: "Resume updating DTC status bits",
            },
            SubFunctionInfo {
                id: 0x02,
                name: "Off",
                description: "Stop updating DTC status bits",
            },
        ],
    },
    ServiceInfo {
        sid: 0x86,
        mnemonic: "ROE",
        name: "ResponseOnEvent",
        description: "ResponseOnEvent service allows the client to request from the server to start or stop transmission of responses on a specified event.",
        sub_functions: &[],
    },
    ServiceInfo {
        sid: 0x87,
        mnemonic: "LC",
        name: "LinkControl",
        description: "LinkControl service allows the client to control the communication between the client and the server(s) in order to gain bus bandwidth for diagnostic purposes (e.g., programming).",
        sub_functions: &[],
    },
];

static NEGATIVE_RESPONSES: &[NrcInfo] = &[
    NrcInfo {
        code: 0x10,
        mnemonic: "GR",
        name: "GeneralReject",
        description: "The requested action has been rejected by the server.",
    },
    NrcInfo {
        code: 0x11,
        mnemonic: "SNS",
        name: "ServiceNotSupported",
        description: "The requested action will not be taken because the server does not support the requested service.",
    },
    NrcInfo {
        code: 0x12,
        mnemonic: "SFNS",
        name: "SubFunctionNotSupported",
        description: "The requested action will not be taken because the server does not support the service-specific parameters of the request message.",
    },
    NrcInfo {
        code: 0x13,
        mnemonic: "IMLIFE",
        name: "IncorrectMessageLengthOrInvalidFormat",
        description: "The requested action will not be taken because the length of the received request message does not match the prescribed length for the specified service or the format of the parameters do not match the prescribed format for the specified service.",
    },
    NrcInfo {
        code: 0x14,
        mnemonic: "RTL",
        name: "ResponseTooLong",
        description: "The response to be generated exceeds the maximum number of bytes available by the underlying network layer.",
    },
    NrcInfo {
        code: 0x21,
        mnemonic: "BR",
        name: "BusyRepeatRequest",
        description: "The server is temporarily too busy to perform the requested operation.",
    },
    NrcInfo {
        code: 0x22,
        mnemonic: "CNC",
        name: "ConditionsNotCorrect",
        description: "The requested action will not be taken because the server prerequisite conditions are not met.",
    },
    NrcInfo {
        code: 0x24,
        mnemonic: "RSE",
        name: "RequestSequenceError",
        description: "The requested action will not be taken because the server expects a different sequence of request messages or message as sent by the client.",
    },
    NrcInfo {
        code: 0x25,
        mnemonic: "NRSC",
        name: "NoResponseFromSubnetComponent",
        description: "The server has received the request but the requested action could not be performed by the server as a subnet component necessary to supply the requested information did not respond within the specified time.",
    },
    NrcInfo {
        code: 0x26,
        mnemonic: "FPE",
        name: "FailurePreventsExecutionOfRequestedAction",
        description: "The requested action will not be taken because a failure condition, identified by a DTC, has occurred and that this failure condition prevents the server from performing the requested action.",
    },
    NrcInfo {
        code: 0x31,
        mnemonic: "ROR",
        name: "RequestOutOfRange",
        description: "The requested action will not be taken because the server has detected that the request message contains a parameter which attempts to substitute a value beyond its range of authority.",
    },
    NrcInfo {
        code: 0x33,
        mnemonic: "SAD",
        name: "SecurityAccessDenied",
        description: "The requested action will not be taken because the server's security strategy has not been satisfied by the client.",
    },
    NrcInfo {
        code: 0x34,
        mnemonic: "AR",
        name: "AuthenticationRequired",
        description: "The requested service will not be taken because the client has insufficient rights based on its Authentication state.",
    },
    NrcInfo {
        code: 0x35,
        mnemonic: "IK",
        name: "InvalidKey",
        description: "The server has not given security access because the key sent by the client did not match with the key in the server's memory.",
    },
    NrcInfo {
        code: 0x36,
        mnemonic: "ENTAO",
        name: "ExceedNumberOfAttempts",
        description: "The requested action will not be taken because the client has unsuccessfully attempted to gain security access more times than the server's security strategy will allow.",
    },
    NrcInfo {
        code: 0x37,
        mnemonic: "RTDNE",
        name: "RequiredTimeDelayNotExpired",
        description: "The requested action will not be taken because the client's latest attempt to gain security access was initiated before the server's required timeout period had elapsed.",
    },
    NrcInfo {
        code: 0x38,
        mnemonic: "SDTR",
        name: "SecureDataTransmissionRequired",
        description: "The requested service will not be taken because the requested action is required to be sent using a secured communication channel.",
    },
    NrcInfo {
        code: 0x39,
        mnemonic: "SDTNA",
        name: "SecureDataTransmissionNotAllowed",
        description: "This message was received using the SecuredDataTransmission service, but the requested action is not allowed to be sent using the SecuredDataTransmission service.",
    },
    NrcInfo {
        code: 0x3A,
        mnemonic: "SDVF",
        name: "SecureDataVerificationFailed",
        description: "The message failed in the security sub-layer.",
    },
    NrcInfo {
        code: 0x50,
        mnemonic: "CVF-ITP",
        name: "CertificateVerificationFailed_InvalidTimePeriod",
        description: "Date and time of the server does not match the validity period of the Certificate.",
    },
    NrcInfo {
        code: 0x51,
        mnemonic: "CVF-IS",
        name: "CertificateVerificationFailed_InvalidSignature",
        description: "Signature of the Certificate could not be verified.",
    },
    NrcInfo {
        code: 0x52,
        mnemonic: "CVF-ICT",
        name: "CertificateVerificationFailed_InvalidChainOfTrust",
        description: "The Certificate could not be verified against stored information about the issuing authority.",
    },
    NrcInfo {
        code: 0x53,
        mnemonic: "CVF-ITY",
        name: "CertificateVerificationFailed_InvalidType",
        description: "The Certificate does not match the current requested use case.",
    },
    NrcInfo {
        code: 0x54,
        mnemonic: "CVF-IF",
        name: "CertificateVerificationFailed_InvalidFormat",
        description: "The Certificate could not be evaluated because the format requirement has not been met.",
    },
    NrcInfo {
        code: 0x55,
        mnemonic: "CVF-IC",
        name: "CertificateVerificationFailed_InvalidContent",
        description: "The Certificate could not be verified because the content does not match.",
    },
    NrcInfo {
        code: 0x56,
        mnemonic: "CVF-IS",
        name: "CertificateVerificationFailed_InvalidScope",
        description: "The scope of the Certificate does not match the contents of the server.",
    },
    NrcInfo {
        code: 0x57,
        mnemonic: "CVF-IC",
        name: "CertificateVerificationFailed_InvalidCertificate",
        description: "The Certificate received from the client is invalid because the server has revoked access for some reason.",
    },
    NrcInfo {
        code: 0x58,
        mnemonic: "OVF",
        name: "OwnershipVerificationFailed",
        description: "Delivered Ownership does not match the provided challenge or could not be verified with the own private key.",
    },
    NrcInfo {
        code: 0x59,
        mnemonic: "CCF",
        name: "ChallengeCalculationFailed",
        description: "The challenge could not be calculated on the server side.",
    },
    NrcInfo {
        code: 0x5A,
        mnemonic: "SARF",
        name: "SettingAccessRightsFailed",
        description: "The server could not set the access rights.",
    },
    NrcInfo {
        code: 0x5B,
        mnemonic: "SKCOF",
        name: "SessionKeyCreationOrDerivationFailed",
        description: "The server could not create or derive a session key.",
    },
    NrcInfo {
        code: 0x5C,
        mnemonic: "CDUF",
        name: "ConfigurationDataUsageFailed",
        description: "The server could not work with the provided configuration data.",
    },
    NrcInfo {
        code: 0x5D,
        mnemonic: "DAF",
        name: "DeAuthenticationFailed",
        description: "DeAuthentication was not successful, server could still be unprotected.",
    },
    NrcInfo {
        code: 0x70,
        mnemonic: "UDNA",
        name: "UploadDownloadNotAccepted",
        description: "An attempt to upload/download to a server's memory cannot be accomplished due to some fault conditions.",
    },
    NrcInfo {
        code: 0x71,
        mnemonic: "TDS",
        name: "TransferDataSuspended",
        description: "A data transfer operation was halted due to some fault. The active transferData sequence shall be aborted.",
    },
    NrcInfo {
        code: 0x72,
        mnemonic: "GPF",
        name: "GeneralProgrammingFailure",
        description: "The server detected an error when erasing or programming a memory location in the permanent memory device (e.g. Flash Memory).",
    },
    NrcInfo {
        code: 0x73,
        mnemonic: "WBSC",
        name: "WrongBlockSequenceCounter",
        description: "The server detected an error in the sequence of blockSequenceCounter values.",
    },
    NrcInfo {
        code: 0x78,
        mnemonic: "RCRRP",
        name: "RequestCorrectlyReceived_ResponsePending",
        description: "The request message was received correctly, and that all parameters in the request message were valid, but the action to be performed is not yet completed, and the server is not yet ready to receive another request.",
    },
    NrcInfo {
        code: 0x7E,
        mnemonic: "SFNSIAS",
        name: "SubFunctionNotSupportedInActiveSession",
        description: "The requested action will not be taken because the server does not support the requested SubFunction in the currently active session.",
    },
    NrcInfo {
        code: 0x7F,
        mnemonic: "SNSIAS",
        name: "ServiceNotSupportedInActiveSession",
        description: "The requested action will not be taken because the server does not support the requested service in the currently active session.",
    },
    NrcInfo {
        code: 0x81,
        mnemonic: "RTH",
        name: "RpmTooHigh",
        description: "The requested action will not be taken because the server prerequisite condition for RPM is not met.",
    },
    NrcInfo {
        code: 0x82,
        mnemonic: "RTL",
        name: "RpmTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for RPM is not met.",
    },
    NrcInfo {
        code: 0x83,
        mnemonic: "EIR",
        name: "EngineIsRunning",
        description: "Required for those actuator tests which cannot be actuated while the engine is running.",
    },
    NrcInfo {
        code: 0x84,
        mnemonic: "EINR",
        name: "EngineIsNotRunning",
        description: "Required for those actuator tests which cannot be actuated unless the engine is running.",
    },
    NrcInfo {
        code: 0x85,
        mnemonic: "ERTL",
        name: "EngineRunTimeTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for engine run time is not met.",
    },
    NrcInfo {
        code: 0x86,
        mnemonic: "TTH",
        name: "TemperatureTooHigh",
        description: "The requested action will not be taken because the server prerequisite condition for temperature is not met.",
    },
    NrcInfo {
        code: 0x87,
        mnemonic: "TTL",
        name: "TemperatureTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for temperature is not met.",
    },
    NrcInfo {
        code: 0x88,
        mnemonic: "VSTH",
        name: "VehicleSpeedTooHigh",
        description: "The requested action will not be taken because the server prerequisite condition for vehicle speed is not met.",
    },
    NrcInfo {
        code: 0x89,
        mnemonic: "VSTL",
        name: "VehicleSpeedTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for vehicle speed is not met.",
    },
    NrcInfo {
        code: 0x8A,
        mnemonic: "TPTLH",
        name: "ThrottleOrPedalTooHigh",
        description: "The requested action will not be taken because the server prerequisite condition for throttle/pedal position is not met.",
    },
    NrcInfo {
        code: 0x8B,
        mnemonic: "TPTLL",
        name: "ThrottleOrPedalTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for throttle/pedal position is not met.",
    },
    NrcInfo {
        code: 0x8C,
        mnemonic: "TRNIN",
        name: "TransmissionRangeNotInNeutral",
        description: "The requested action will not be taken because the server prerequisite condition for being in neutral is not met.",
    },
    NrcInfo {
        code: 0x8D,
        mnemonic: "TRNIG",
        name: "TransmissionRangeNotInGear",
        description: "The requested action will not be taken because the server prerequisite condition for being in gear is not met.",
    },
    NrcInfo {
        code: 0x8F,
        mnemonic: "BSOSNC",
        name: "BrakeSwitchOrSwitchesNotClosed",
        description: "For safety reasons, this is required for certain tests before it begins, and shall be maintained for the entire duration of the test.",
    },
    NrcInfo {
        code: 0x90,
        mnemonic: "SLNIP",
        name: "ShifterLeverNotInPark",
        description: "For safety reasons, this is required for certain tests before it begins, and shall be maintained for the entire duration of the test.",
    },
    NrcInfo {
        code: 0x91,
        mnemonic: "TCCL",
        name: "TorqueConvertClutchLocked",
        description: "The requested action will not be taken because the server prerequisite condition for torque converter clutch is not met.",
    },
    NrcInfo {
        code: 0x92,
        mnemonic: "VTH",
        name: "VoltageTooHigh",
        description: "The requested action will not be taken because the server prerequisite condition for voltage at the primary pin of the server (ECU) is too high.",
    },
    NrcInfo {
        code: 0x93,
        mnemonic: "VTL",
        name: "VoltageTooLow",
        description: "The requested action will not be taken because the server prerequisite condition for voltage at the primary pin of the server (ECU) is too low.",
    },
    NrcInfo {
        code: 0x94,
        mnemonic: "RTNA",
        name: "ResourceTemporarilyNotAvailable",
        description: "The requested action will not be taken because the server's normal operating mode is temporarily inhibited, e.g., because it is busy or temporarily out of service. The client may repeat the request, but it should be tried less often in the future.",
    },
];

pub fn is_known_service(sid: u8) -> bool {
    SERVICES.iter().any(|service| service.sid == sid)
}

pub fn service_info(sid: u8) -> &'static ServiceInfo {
    SERVICES
        .iter()
        .find(|service| service.sid == sid)
        .unwrap_or(&UNKNOWN_SERVICE)
}

/// Sub-function of a service, unknown when either id is missing
pub fn sub_function_info(sid: u8, id: u8) -> &'static SubFunctionInfo {
    service_info(sid)
        .sub_function(id)
        .unwrap_or(&UNKNOWN_SUB_FUNCTION)
}

pub fn is_known_nrc(code: u8) -> bool {
    NEGATIVE_RESPONSES.iter().any(|nrc| nrc.code == code)
}

pub fn negative_response_info(code: u8) -> &'static NrcInfo {
    NEGATIVE_RESPONSES
        .iter()
        .find(|nrc| nrc.code == code)
        .unwrap_or(&UNKNOWN_NRC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_service_lookup() {
        let info = service_info(0x27);
        assert_eq!(info.mnemonic, "SA");
        assert_eq!(info.name, "SecurityAccess");
        assert!(is_known_service(0x36));
        assert_eq!(service_info(0x36).name, "TransferData");
    }

    #[test]
    fn test_unknown_service_falls_back() {
        assert!(!is_known_service(0x01));
        let info = service_info(0x01);
        assert_eq!(info.sid, 0xFF);
        assert_eq!(info.name, "Unknown SID");
        assert!(info.sub_functions.is_empty());
    }

    #[test]
    fn test_ecu_reset_sub_functions() {
        assert_eq!(sub_function_info(0x11, 0x01).name, "HardReset");
        assert_eq!(sub_function_info(0x11, 0x03).name, "SoftReset");
        assert_eq!(sub_function_info(0x11, 0x05).name, "DisableRapidPowerShutDown");
        assert_eq!(sub_function_info(0x11, 0x00).id, 0xFF);
    }

    #[test]
    fn test_sub_function_of_unknown_service() {
        assert_eq!(sub_function_info(0x01, 0x01), &UNKNOWN_SUB_FUNCTION);
        assert_eq!(sub_function_info(0x22, 0x01).name, "Unknown SubFunc");
        assert_eq!(sub_function_info(0x10, 0x02).name, "ProgrammingSession");
    }

    #[test]
    fn test_nrc_lookup() {
        assert!(is_known_nrc(0x78));
        let pending = negative_response_info(0x78);
        assert_eq!(pending.mnemonic, "RCRRP");
        assert_eq!(negative_response_info(0x35).name, "InvalidKey");

        assert!(!is_known_nrc(0x00));
        assert_eq!(negative_response_info(0x00), &UNKNOWN_NRC);
    }

    #[test]
    fn test_tables_have_unique_ids() {
        for (i, service) in SERVICES.iter().enumerate() {
            assert!(SERVICES[i + 1..].iter().all(|other| other.sid != service.sid));
        }
        for (i, nrc) in NEGATIVE_RESPONSES.iter().enumerate() {
            assert!(NEGATIVE_RESPONSES[i + 1..]
                .iter()
                .all(|other| other.code != nrc.code));
        }
    }
}
