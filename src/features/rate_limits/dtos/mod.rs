mod flow_control_dto;

pub use flow_control_dto::{
    ChassisConfigDto, CseConfigDto, FlowControlConfigDto, ProviderFlowControlDto, QpsConfigDto,
    QpsGlobalDto, ServiceNameDto,
};
