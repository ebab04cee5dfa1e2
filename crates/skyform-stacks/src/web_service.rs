//! Containerized web service behind a load balancer
//!
//! A network, a cluster, a security group admitting HTTP, a load balancer
//! with target group and listener, the execution role the tasks run under,
//! and the service itself. The service declares an explicit dependency on the
//! listener: it reads none of the listener's outputs, but must not start
//! before traffic can reach it.

use serde_json::json;
use skyform_graph::{Expr, ResourceNode, Stack};

/// Build the web-service stack
pub fn stack() -> Stack {
    let mut stack = Stack::new("web-service");

    stack.add_resource(ResourceNode::new("network", "app-vpc"));

    stack.add_resource(ResourceNode::new("cluster", "app-cluster"));

    stack.add_resource(
        ResourceNode::new("security-group", "web-secgrp")
            .with_input("vpc_id", Expr::output("app-vpc", "id"))
            .with_input("description", "Enable HTTP access")
            .with_input(
                "ingress",
                Expr::lit(json!([{
                    "protocol": "tcp",
                    "from_port": 80,
                    "to_port": 80,
                    "cidr_blocks": ["0.0.0.0/0"],
                }])),
            )
            .with_input(
                "egress",
                Expr::lit(json!([{
                    "protocol": "-1",
                    "from_port": 0,
                    "to_port": 0,
                    "cidr_blocks": ["0.0.0.0/0"],
                }])),
            ),
    );

    stack.add_resource(
        ResourceNode::new("load-balancer", "app-lb")
            .with_input(
                "security_groups",
                Expr::list([Expr::output("web-secgrp", "id")]),
            )
            .with_input("subnets", Expr::output("app-vpc", "public_subnet_ids")),
    );

    stack.add_resource(
        ResourceNode::new("target-group", "app-tg")
            .with_input("port", Expr::lit(80))
            .with_input("protocol", "HTTP")
            .with_input("target_type", "ip")
            .with_input("vpc_id", Expr::output("app-vpc", "id")),
    );

    stack.add_resource(
        ResourceNode::new("listener", "web")
            .with_input("load_balancer_arn", Expr::output("app-lb", "arn"))
            .with_input("port", Expr::lit(80))
            .with_input(
                "default_actions",
                Expr::list([Expr::map([
                    ("type", Expr::lit("forward")),
                    ("target_group_arn", Expr::output("app-tg", "arn")),
                ])]),
            ),
    );

    stack.add_resource(
        ResourceNode::new("role", "task-exec-role").with_input(
            "assume_role_policy",
            Expr::lit(
                json!({
                    "Version": "2008-10-17",
                    "Statement": [{
                        "Sid": "",
                        "Effect": "Allow",
                        "Principal": {"Service": "container-tasks.sim.internal"},
                        "Action": "sts:AssumeRole",
                    }]
                })
                .to_string(),
            ),
        ),
    );

    stack.add_resource(
        ResourceNode::new("policy", "task-exec-policy")
            .with_input("role", Expr::output("task-exec-role", "name"))
            .with_input(
                "policy_arn",
                "arn:sim:iam::managed:policy/TaskExecutionRolePolicy",
            ),
    );

    stack.add_resource(
        ResourceNode::new("task-definition", "app-task")
            .with_input("family", "fargate-task-definition")
            .with_input("cpu", "256")
            .with_input("memory", "512")
            .with_input("network_mode", "awsvpc")
            .with_input("requires_compatibilities", Expr::lit(json!(["FARGATE"])))
            .with_input("execution_role_arn", Expr::output("task-exec-role", "arn"))
            .with_input(
                "container_definitions",
                Expr::lit(
                    json!([{
                        "name": "my-app",
                        "image": "nginx",
                        "portMappings": [{
                            "containerPort": 80,
                            "hostPort": 80,
                            "protocol": "tcp",
                        }]
                    }])
                    .to_string(),
                ),
            ),
    );

    stack.add_resource(
        ResourceNode::new("container-service", "app-svc")
            .with_input("cluster", Expr::output("app-cluster", "arn"))
            .with_input("desired_count", Expr::lit(1))
            .with_input("launch_type", "FARGATE")
            .with_input("task_definition", Expr::output("app-task", "arn"))
            .with_input(
                "network_configuration",
                Expr::map([
                    ("assign_public_ip", Expr::lit(true)),
                    ("subnets", Expr::output("app-vpc", "private_subnet_ids")),
                    (
                        "security_groups",
                        Expr::list([Expr::output("web-secgrp", "id")]),
                    ),
                ]),
            )
            .with_input(
                "load_balancers",
                Expr::list([Expr::map([
                    ("target_group_arn", Expr::output("app-tg", "arn")),
                    ("container_name", Expr::lit("my-app")),
                    ("container_port", Expr::lit(80)),
                ])]),
            )
            .with_depends_on("web"),
    );

    stack.export(
        "url",
        Expr::concat([Expr::lit("http://"), Expr::output("app-lb", "dns_name")]),
    );

    stack
}
